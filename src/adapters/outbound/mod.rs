mod memory_counter_store;
mod redis_counter_store;

pub use memory_counter_store::MemoryCounterStore;
pub use redis_counter_store::RedisCounterStore;
