/// A change to a `ReplicatedArray`, recorded after local storage has already
/// been updated, whether the change was made locally or received remotely.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayChange<T> {
    Set { index: usize, value: T },
    Cleared,
    Resized { length: usize },
}
