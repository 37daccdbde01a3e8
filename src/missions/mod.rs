pub mod action;
pub mod action_context;
pub mod dock;
pub mod final_dock;

#[cfg(test)]
pub(crate) mod test_context;
