pub mod auth_service;
pub mod bin_service;
pub mod category_service;
pub mod health_service;
pub mod item_service;
pub mod member_service;
pub mod organization_service;
pub mod qr_service;
pub mod scanner_service;
pub mod search_service;
pub mod session_service;
pub mod two_factor_service;

pub use auth_service::AuthServiceImpl;
pub use bin_service::BinServiceImpl;
pub use category_service::CategoryServiceImpl;
pub use health_service::HealthServiceImpl;
pub use item_service::ItemServiceImpl;
pub use member_service::MemberServiceImpl;
pub use organization_service::OrganizationServiceImpl;
pub use qr_service::QrServiceImpl;
pub use scanner_service::ScannerServiceImpl;
pub use search_service::SearchServiceImpl;
pub use session_service::SessionServiceImpl;
pub use two_factor_service::TwoFactorServiceImpl;
