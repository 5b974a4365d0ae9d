use async_trait::async_trait;

use super::Claim;
use crate::error::MqResult;

/// Потребитель темы, поставляется вызывающей стороной `subscribe`.
///
/// `setup` получает принимающую сторону [`Claim`] и вызывается ровно один
/// раз до старта цикла чтения; его ошибка отменяет подписку целиком.
/// `cleanup` вызывается ровно один раз после остановки цикла. Потребитель
/// самостоятельно вычитывает claim до `None` и затем забирает итог через
/// `Claim::finish`.
#[async_trait]
pub trait Consumer: Send + 'static {
    async fn setup(&mut self, claim: Claim) -> MqResult<()>;

    async fn cleanup(&mut self) -> MqResult<()>;
}
