pub mod camera_device;
pub mod dispatcher;
pub mod hardware;
pub mod photo_storage;
pub mod session_observer;
pub mod session_view;
