//! Entity services.
//!
//! Each service composes the query builder, an `AuthorizedClient` and the
//! sync-token resolver into the operations the workflow needs for one
//! entity type. `AccountingServices` bundles them.

mod account;
mod customer;
mod invoice;
mod item;
mod payment;
mod sync_token;

pub use account::{AccountService, NewAccount};
pub use customer::CustomerService;
pub use invoice::{InvoiceDraft, InvoiceService};
pub use item::{ItemDraft, ItemService};
pub use payment::PaymentService;
pub use sync_token::SyncTokenResolver;

/// Façade over the entity services.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountingServices {
    pub accounts: AccountService,
    pub customers: CustomerService,
    pub items: ItemService,
    pub invoices: InvoiceService,
    pub payments: PaymentService,
    pub sync_tokens: SyncTokenResolver,
}
