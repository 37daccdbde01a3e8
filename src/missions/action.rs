use std::future::Future;

/**
 * A trait for an action that can be executed.
 *
 * Actions borrow whatever context they drive and are built fresh for each use.
 */
pub trait Action {}

/**
 * A trait for an action that can be executed.
 *
 * The returned future is `Send` so actions can be awaited from spawned tasks.
 */
pub trait ActionExec<T: Send + Sync>: Action + Send + Sync {
    fn execute(&mut self) -> impl Future<Output = T> + Send;
}
