pub mod evaluate;
pub mod extract;
pub mod products;
pub mod score;
