pub mod card;
pub mod deploys;
pub mod fetch;
pub mod time_since;
pub mod version;
pub mod view;

pub use card::{CardProps, VersionHoverCard};
pub use deploys::EnvironmentDeployIndex;
pub use fetch::FetchCoordinator;
pub use view::CardContent;
