/// Router Module Index
///
/// Splits the HTTP surface by access level. Gates are applied as layers on whole
/// modules, never ad hoc inside handlers.

/// Routes accessible to anyone (health, register, login).
pub mod public;

/// Routes that need a valid session token, any role.
pub mod authenticated;

/// Routes restricted to the Admin role.
pub mod admin;
