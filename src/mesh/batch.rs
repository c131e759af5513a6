use super::Submesh;

/// Groups output indices by material slot and flattens them into one index
/// buffer with a [`Submesh`] per non-empty slot.
pub struct BatchPartitioner {
    groups: Vec<Vec<u32>>,
}

impl BatchPartitioner {
    /// `material_slots` counts the default material.
    #[must_use]
    pub fn new(material_slots: usize) -> Self {
        Self {
            groups: vec![Vec::new(); material_slots],
        }
    }

    /// Maps a face's material id to a slot, falling back to the default slot
    /// (`declared`) when the id is unset or not below `declared`.
    #[must_use]
    pub fn resolve_slot(material_id: Option<usize>, declared: usize) -> usize {
        match material_id {
            Some(id) if id < declared => id,
            _ => declared,
        }
    }

    /// Records one index for `slot`, which must come from [`Self::resolve_slot`].
    pub fn push(&mut self, slot: usize, index: u32) {
        debug_assert!(
            slot < self.groups.len(),
            "material slot {slot} out of {} slots",
            self.groups.len()
        );
        if let Some(group) = self.groups.get_mut(slot) {
            group.push(index);
        }
    }

    /// Concatenates the groups in slot order. Empty slots emit no submesh.
    #[must_use]
    pub fn finish(self) -> (Vec<u32>, Vec<Submesh>) {
        let total = self.groups.iter().map(Vec::len).sum();
        let mut indices = Vec::with_capacity(total);
        let mut submeshes = Vec::new();

        for (slot, group) in self.groups.into_iter().enumerate() {
            if group.is_empty() {
                continue;
            }

            submeshes.push(Submesh {
                index_offset: indices.len() as u32,
                index_count: group.len() as u32,
                material_index: slot as u32,
            });
            indices.extend(group);
        }

        (indices, submeshes)
    }
}
