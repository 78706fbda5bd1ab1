// Routing core: tables, relaxation, the router loops and outage injection.

pub mod distance_vector;
pub mod routing_table;
pub mod routing_state;
pub mod router;
pub mod outage;

pub use distance_vector::{DistanceVector, RouteChange};
pub use outage::OutageSimulator;
pub use router::Router;
pub use routing_state::{NeighborAddress, RoutingState};
pub use routing_table::LinkTable;
