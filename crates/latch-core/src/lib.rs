pub mod bench;
pub mod compute;
pub mod consts;
pub mod descriptor;
pub mod detect;
pub mod error;
pub mod io;
pub mod keypoint;
pub mod table;
pub mod verify;
