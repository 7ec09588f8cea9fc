pub mod consultation;
pub mod dates;
pub mod enums;
pub mod medecin;
pub mod notification;
pub mod patient;
pub mod rendez_vous;
pub mod snapshot;

pub use consultation::*;
pub use medecin::*;
pub use notification::*;
pub use patient::*;
pub use rendez_vous::*;
pub use snapshot::ClinicSnapshot;
