/// A buddy's current lifecycle phase within the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuddyMode {
    /// At most one buddy runs here at a time, negotiating a new pivot.
    Single,
    /// All buddies run concurrently once a pivot has been negotiated.
    Multi,
    /// Parked for a global barrier hook; resumes its prior mode after.
    Pool,
}
