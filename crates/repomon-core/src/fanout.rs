/// How an `analyze` call dispatches its children.
///
/// Only the outermost fan-out level runs in parallel: a `Parallel` caller
/// spawns one task per child and hands each child `Sequential`, so nested
/// levels iterate inline instead of piling more tasks onto the runtime.
/// The flag is threaded explicitly through every `analyze` call rather than
/// inferred from the executing thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fanout {
    Parallel,
    Sequential,
}
