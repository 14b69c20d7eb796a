pub mod bin;
pub mod bin_item;
pub mod category;
pub mod item;
pub mod organization;
pub mod qr_code;
pub mod session;
pub mod user;

pub use bin::BinModel;
pub use bin_item::BinItemRow;
pub use category::CategoryModel;
pub use item::ItemModel;
pub use organization::OrganizationModel;
pub use qr_code::QrCodeModel;
pub use session::SessionModel;
pub use user::UserModel;
