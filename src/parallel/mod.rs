//! Generic parallel execution framework
//!
//! Resource management and execution strategy only: worker counts come from
//! the machine (`num_cpus`) and user limits, never from knowledge of what the
//! work items are. Callers decide when parallelism is worth it and pass the
//! final worker count in.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   Client        │    │   Parallel       │    │   System        │
//! │   (LineFilter)  │───▶│   Module         │───▶│   Resources     │
//! │                 │    │                  │    │                 │
//! │ • File counts   │    │ • CPU cores      │    │ • Hardware      │
//! │ • Output naming │    │ • Thread mgmt    │    │ • OS limits     │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! Results always come back in the order the work items were supplied.
//!
//! ```rust
//! use icpsr_filter::parallel::ExecutionStrategy;
//!
//! let strategy = ExecutionStrategy::Parallel { workers: 4 };
//! let doubled = strategy
//!     .execute(vec![1, 2, 3], |x, _worker_id| x * 2, None::<fn(usize, usize, usize)>)
//!     .unwrap();
//! assert_eq!(doubled, vec![2, 4, 6]);
//! ```

pub mod core;
pub mod progress;

pub use self::core::{ExecutionStrategy, ParallelExecutor, SequentialExecutor};
pub use progress::FilterProgress;
