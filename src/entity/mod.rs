pub mod carts;
pub mod products;
pub mod users;

pub use carts::Entity as Carts;
pub use products::Entity as Products;
pub use users::Entity as Users;
