//! Right-to-Collect registry
//!
//! Maps every invoice to the party currently entitled to its payment. The
//! registry is pure bookkeeping: it never moves value. Rights are minted by
//! the ledger on invoice creation and afterwards change hands only through
//! holder-authorized transfers.

use std::collections::HashMap;

use core_kernel::{InvoiceId, PartyId};
use crate::error::EscrowError;

/// Registry of transferable Right-to-Collect tokens
#[derive(Debug, Default, Clone)]
pub struct RightToCollectRegistry {
    /// Current holder per invoice
    holders: HashMap<InvoiceId, PartyId>,
    /// Single approved spender per invoice, cleared on transfer
    approvals: HashMap<InvoiceId, PartyId>,
}

impl RightToCollectRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Establishes the right for a new invoice
    ///
    /// # Errors
    ///
    /// - `AlreadyMinted` if a right already exists for `invoice_id`
    /// - `InvalidRecipient` if `initial_holder` is the nil party
    pub(crate) fn mint(
        &mut self,
        invoice_id: InvoiceId,
        initial_holder: PartyId,
    ) -> Result<(), EscrowError> {
        if self.holders.contains_key(&invoice_id) {
            return Err(EscrowError::AlreadyMinted(invoice_id));
        }
        if initial_holder.is_nil() {
            return Err(EscrowError::InvalidRecipient);
        }
        self.holders.insert(invoice_id, initial_holder);
        Ok(())
    }

    /// Returns the party currently entitled to collect
    pub fn current_holder(&self, invoice_id: InvoiceId) -> Result<PartyId, EscrowError> {
        self.holders
            .get(&invoice_id)
            .copied()
            .ok_or(EscrowError::InvoiceNotFound(invoice_id))
    }

    /// Returns the approved spender, if any
    pub fn approved(&self, invoice_id: InvoiceId) -> Result<Option<PartyId>, EscrowError> {
        self.current_holder(invoice_id)?;
        Ok(self.approvals.get(&invoice_id).copied())
    }

    /// Moves the right to `new_holder`
    ///
    /// The caller must be the current holder or the approved spender. Any
    /// approval is cleared.
    ///
    /// # Returns
    ///
    /// The previous holder
    pub fn transfer(
        &mut self,
        caller: PartyId,
        invoice_id: InvoiceId,
        new_holder: PartyId,
    ) -> Result<PartyId, EscrowError> {
        let holder = self.current_holder(invoice_id)?;
        let approved = self.approvals.get(&invoice_id) == Some(&caller);
        if caller != holder && !approved {
            return Err(EscrowError::OnlyCurrentHolder);
        }
        if new_holder.is_nil() {
            return Err(EscrowError::InvalidRecipient);
        }

        self.approvals.remove(&invoice_id);
        self.holders.insert(invoice_id, new_holder);
        Ok(holder)
    }

    /// Approves `spender` to transfer the right once, or clears approval with `None`
    pub fn approve(
        &mut self,
        caller: PartyId,
        invoice_id: InvoiceId,
        spender: Option<PartyId>,
    ) -> Result<(), EscrowError> {
        let holder = self.current_holder(invoice_id)?;
        if caller != holder {
            return Err(EscrowError::OnlyCurrentHolder);
        }
        match spender {
            Some(spender) if spender.is_nil() => return Err(EscrowError::InvalidRecipient),
            Some(spender) => {
                self.approvals.insert(invoice_id, spender);
            }
            None => {
                self.approvals.remove(&invoice_id);
            }
        }
        Ok(())
    }

    /// Number of rights held by `holder`
    pub fn balance_of(&self, holder: PartyId) -> usize {
        self.holders.values().filter(|h| **h == holder).count()
    }

    /// Invoices whose right is held by `holder`, in id order
    pub fn rights_of(&self, holder: PartyId) -> Vec<InvoiceId> {
        let mut ids: Vec<InvoiceId> = self
            .holders
            .iter()
            .filter(|(_, h)| **h == holder)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Total number of minted rights
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    /// Returns true if no right has been minted
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}
