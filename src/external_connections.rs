use sqlx::PgConnection;

/// A borrowed database connection, either straight from the pool or from inside a transaction
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Provides access to the external systems the application talks to. Driven adapters
/// take one of these so they don't need to know whether they're inside a transaction.
pub trait ExternalConnectivity {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// An ExternalConnectivity which can start a database transaction
pub trait Transactable: ExternalConnectivity {
    type Handle: TransactionHandle;

    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}

/// An ExternalConnectivity with an open transaction. Dropping it without calling
/// [TransactionHandle::commit] rolls the transaction back.
pub trait TransactionHandle: ExternalConnectivity {
    async fn commit(self) -> Result<(), anyhow::Error>;
}
