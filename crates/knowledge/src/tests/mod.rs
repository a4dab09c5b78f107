//! Pipeline tests across the answering stack.

mod support;
