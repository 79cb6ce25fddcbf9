// Copyright (c) 2026 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Wrap the given expression in `Ok(..)`, or return `Ok(())` when called w/out
/// arguments.
///
/// ```
/// use logbridge::ok;
///
/// fn unit() -> miette::Result<()> { ok!() }
/// fn value() -> miette::Result<u16> { ok!(9003) }
///
/// assert!(unit().is_ok());
/// assert_eq!(value().unwrap(), 9003);
/// ```
#[macro_export]
macro_rules! ok {
    () => {
        Ok(())
    };
    ($value:expr) => {
        Ok($value)
    };
}
