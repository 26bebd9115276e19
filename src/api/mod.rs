pub mod client;
pub mod models;
pub mod mutate;
pub mod transport;
pub mod tree;

#[cfg(test)]
mod test_support;


#[cfg(test)]
mod mutate_test;
