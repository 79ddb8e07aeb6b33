/// Hands out node and element identifiers in strictly increasing order.
///
/// One allocator is threaded through mesh generation; identifiers are never
/// reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierAllocator {
    next_node: u32,
    next_element: u32,
}

impl IdentifierAllocator {
    /// Creates an allocator whose first node and element identifiers are
    /// `node` and `element`.
    #[must_use]
    pub fn starting_at(node: u32, element: u32) -> Self {
        Self {
            next_node: node,
            next_element: element,
        }
    }

    /// Returns the next node identifier.
    pub fn next_node(&mut self) -> u32 {
        let id = self.next_node;
        self.next_node += 1;
        id
    }

    /// Returns the next element identifier.
    pub fn next_element(&mut self) -> u32 {
        let id = self.next_element;
        self.next_element += 1;
        id
    }

    /// The identifier the next call to [`Self::next_node`] returns.
    #[must_use]
    pub fn peek_node(&self) -> u32 {
        self.next_node
    }

    /// The identifier the next call to [`Self::next_element`] returns.
    #[must_use]
    pub fn peek_element(&self) -> u32 {
        self.next_element
    }
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::starting_at(1, 1)
    }
}
