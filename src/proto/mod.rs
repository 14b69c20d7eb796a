// Generated proto modules will be included here after build
// Run `cargo build` to generate the proto code

pub mod common {
    include!("binventory.common.rs");
}

pub mod auth {
    include!("binventory.auth.rs");
}

pub mod organization {
    include!("binventory.organization.rs");
}

pub mod bins {
    include!("binventory.bins.rs");
}

pub mod items {
    include!("binventory.items.rs");
}

pub mod categories {
    include!("binventory.categories.rs");
}

pub mod qr {
    include!("binventory.qr.rs");
}

pub mod search {
    include!("binventory.search.rs");
}

pub mod health {
    include!("grpc.health.v1.rs");
}
