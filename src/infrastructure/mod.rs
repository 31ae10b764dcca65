pub mod diesel_gateway;
pub mod memory;
pub mod models;

#[cfg(test)]
pub(crate) mod test_db;

pub use diesel_gateway::DieselGateway;
pub use memory::InMemoryGateway;
