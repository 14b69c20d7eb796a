use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CategoryModel {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    /// Ancestor ids, root first. Must mirror the parent chain.
    pub path: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl CategoryModel {
    /// Path the children of this category must carry.
    pub fn child_path(&self) -> Vec<Uuid> {
        let mut path = self.path.clone();
        path.push(self.id);
        path
    }

    /// True when `candidate` is this category itself or one of its
    /// descendants, i.e. an illegal new parent.
    pub fn would_cycle(&self, candidate_id: Uuid, candidate_path: &[Uuid]) -> bool {
        candidate_id == self.id || candidate_path.contains(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(id: &str, parent: Option<&str>, path: &[&str]) -> CategoryModel {
        CategoryModel {
            id: id.parse().unwrap(),
            organization_id: Uuid::nil(),
            name: "c".into(),
            parent_id: parent.map(|p| p.parse().unwrap()),
            path: path.iter().map(|p| p.parse().unwrap()).collect(),
            created_at: Utc::now(),
        }
    }

    const A: &str = "00000000-0000-0000-0000-00000000000a";
    const B: &str = "00000000-0000-0000-0000-00000000000b";
    const C: &str = "00000000-0000-0000-0000-00000000000c";

    #[test]
    fn test_child_path_appends_own_id() {
        let b = category(B, Some(A), &[A]);
        let expected: Vec<Uuid> = vec![A.parse().unwrap(), B.parse().unwrap()];
        assert_eq!(b.child_path(), expected);
    }

    #[test]
    fn test_cycle_detection() {
        // a -> b -> c; moving a under c must be rejected
        let a = category(A, None, &[]);
        let c = category(C, Some(B), &[A, B]);
        assert!(a.would_cycle(c.id, &c.path));
        // moving a under itself is also a cycle
        assert!(a.would_cycle(a.id, &a.path));
        // moving c under a is fine
        assert!(!c.would_cycle(a.id, &a.path));
    }
}
