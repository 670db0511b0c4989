pub mod order;
pub mod request;
pub mod shipment;
