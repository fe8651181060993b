//! Supervisor lifecycle, ordering, and backpressure tests.
