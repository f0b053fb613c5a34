//! Target address type.

use std::fmt;
use std::ops::Add;

/// Strongly typed address in the inferior's address space
///
/// The dispatch core never interprets addresses itself; it only forwards them.
/// The newtype keeps addresses from being confused with lengths and counts in
/// the operation payloads, which carry plenty of both.
///
/// ## Example
///
/// ```rust
/// use strata_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// assert_eq!((addr + 0x10).value(), 0x1010);
/// assert_eq!(addr.to_string(), "0x0000000000001000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address.
    pub const ZERO: Self = Address(0);

    /// Create an address in const contexts.
    #[must_use]
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Add an offset, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Whether `self` falls inside the half-open range `[start, start + len)`.
    ///
    /// A range that would run past the end of the address space is clamped to
    /// it, and an empty range contains nothing.
    ///
    /// ```rust
    /// use strata_core::types::Address;
    ///
    /// let start = Address::new(0x1000);
    /// assert!(Address::new(0x1003).within(start, 4));
    /// assert!(!Address::new(0x1004).within(start, 4));
    /// assert!(!start.within(start, 0));
    /// ```
    #[must_use]
    pub fn within(self, start: Address, len: u64) -> bool
    {
        if len == 0 || self.0 < start.0 {
            return false;
        }
        match start.0.checked_add(len) {
            Some(end) => self.0 < end,
            None => true,
        }
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}
