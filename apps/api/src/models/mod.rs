pub mod cv;
