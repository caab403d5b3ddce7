pub mod esim_controller;
pub mod view_controller;
