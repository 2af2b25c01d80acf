//! Cross-module scenario tests

mod index_properties;
