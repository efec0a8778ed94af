/*!
Command dispatcher module.

  src/cmd/
    mod.rs       (this file: declarations + re-exports)
    call.rs      (CallArgs     + execute_call)
    list.rs      (ListArgs     + execute_list)
    describe.rs  (DescribeArgs + execute_describe)
    shared.rs    (schema loading, argument collection, error output)
    format.rs    (colors / boxes / tables for human output)

Conventions:
  - Each subcommand module exposes exactly one public `execute_*` function
    that returns `anyhow::Result<()>`.
  - Argument structs derive `clap::Args` and are kept minimal.
*/

pub mod call;
pub mod describe;
pub mod format;
pub mod list;
pub mod shared;

pub use call::{CallArgs, execute_call};
pub use describe::{DescribeArgs, execute_describe};
pub use list::{ListArgs, execute_list};
