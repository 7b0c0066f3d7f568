//! Policy list parsing.

pub mod parse;

pub use parse::{
    parse_policies, parse_policy_list, validate_policy_name, PolicyError, RESERVED_ROOT_POLICY,
};
