pub mod hw_init;
