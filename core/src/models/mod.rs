// core/src/models/mod.rs

//! Records stored by a datastore, the views serialized back to callers, and
//! the inputs that create or change them.

pub mod cart;
pub mod collection;
pub mod customer;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use cart::{AddCartItem, Cart, CartDetail, CartLine, SimpleProduct, UpdateCartItem};
pub use collection::{Collection, CollectionInput, CollectionPatch};
pub use customer::{Customer, CustomerInput, CustomerPatch, CustomerProfile, Membership};
pub use order::{Order, OrderDetail, OrderItem, PaymentStatus, PlaceOrder, UpdateOrder};
pub use product::{Product, ProductInput, ProductPatch, ProductView};
pub use review::{Review, ReviewInput, ReviewPatch};
pub use user::{NewUser, User};
