pub mod actor;
pub mod item;
pub mod order;
pub mod request;
pub mod shipment;
pub mod status;

pub use actor::{Actor, Role};
pub use item::CatalogItem;
pub use order::Order;
pub use request::{RequestItem, SupplyRequest};
pub use shipment::Shipment;
pub use status::{OrderStatus, Priority, RequestStatus, ShipmentStatus};
