//! Reference checks run before any write.

use crate::domain::{EntityFields, EntityId};
use crate::error::AppError;
use crate::store::Repository;

/// An owning reference must point at an existing row.
pub async fn ensure_exists<F, R>(repo: &R, id: Option<EntityId>) -> Result<(), AppError>
where
    F: EntityFields,
    R: Repository<F> + ?Sized,
{
    match id {
        Some(id) if !repo.exists_by_id(id).await? => Err(AppError::BadRequest(format!(
            "{} {} does not exist",
            F::ENTITY_NAME,
            id
        ))),
        _ => Ok(()),
    }
}

/// Every id of an inverse collection must exist before the parent is written.
pub async fn ensure_all_exist<F, R>(repo: &R, ids: &[EntityId]) -> Result<(), AppError>
where
    F: EntityFields,
    R: Repository<F> + ?Sized,
{
    if ids.is_empty() {
        return Ok(());
    }
    let found = repo.find_all_by_id(ids).await?;
    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|p| p.id() == **id)) {
        return Err(AppError::BadRequest(format!("{} {} does not exist", F::ENTITY_NAME, missing)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Record, Resident};
    use crate::store::Store;

    #[tokio::test]
    async fn reference_checks() {
        let store = Store::memory();
        let saved = store
            .residents
            .save(Record::Unsaved(Resident {
                resident_name: "AAA".into(),
                resident_address: "AA".into(),
            }))
            .await
            .unwrap();

        assert!(ensure_exists::<Resident, _>(&*store.residents, None).await.is_ok());
        assert!(ensure_exists::<Resident, _>(&*store.residents, Some(saved.id())).await.is_ok());
        assert!(ensure_exists::<Resident, _>(&*store.residents, Some(EntityId::new(9))).await.is_err());
        assert!(ensure_all_exist::<Resident, _>(&*store.residents, &[saved.id(), EntityId::new(9)]).await.is_err());
    }
}
