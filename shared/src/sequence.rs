/// A 16-bit sequence or acknowledgement number. Arithmetic wraps at 65536.
pub type SeqNum = u16;

/// Signed distance travelled going from `from` to `to`, taking the shorter
/// way around the ring.
///
/// # Examples
/// ```
/// # use radome_shared::wrapping_diff;
/// assert_eq!(wrapping_diff(1, 2), 1);
/// assert_eq!(wrapping_diff(2, 1), -1);
/// assert_eq!(wrapping_diff(65535, 0), 1);
/// assert_eq!(wrapping_diff(0, 65535), -1);
/// ```
pub fn wrapping_diff(from: SeqNum, to: SeqNum) -> i32 {
    i32::from(to.wrapping_sub(from) as i16)
}

/// Whether a packet that has waited `age` flushes without being acknowledged
/// should be resent this flush. Resends happen at ages 1, 2, 4, 8, ...
pub fn is_resend_age(age: u16) -> bool {
    age.is_power_of_two()
}
