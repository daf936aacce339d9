//! Entity shapes mirrored from the commerce REST API.
//!
//! These are transient, best-effort copies of server state. Optional fields
//! default when absent so older or newer backend builds still decode.

pub mod catalog;
pub mod content;
pub mod order;
pub mod page;
pub mod payment;
pub mod report;
pub mod settings;
pub mod user;

pub use catalog::{Category, CategoryWrite, Product, ProductImage, ProductWrite, Variant};
pub use content::{Banner, BannerWrite, JournalEntry, JournalWrite};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusUpdate, ShippingAddress};
pub use page::Page;
pub use payment::{PaymentInitiated, PaymentMethod, PaymentRequest, PaymentStatusReport};
pub use report::{DailyPoint, ReportPeriod, ReportSummary, TopProduct};
pub use settings::SiteSettings;
pub use user::{ProfileUpdate, User};

fn default_true() -> bool {
    true
}
