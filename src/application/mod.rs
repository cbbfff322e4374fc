pub mod fanout;
pub mod settlement;
