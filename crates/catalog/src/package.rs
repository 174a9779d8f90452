use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tapline_core::{DomainError, Entity, EntityId, VenueId};

use crate::product::ProductId;

/// Package identifier (venue-scoped via `venue_id` on the record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub EntityId);

impl PackageId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PackageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Who a package may be sold to / how it is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    VipOnly,
    Regular,
    Promotional,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::VipOnly => "vip_only",
            PackageType::Regular => "regular",
            PackageType::Promotional => "promotional",
        }
    }
}

impl core::str::FromStr for PackageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vip_only" => Ok(PackageType::VipOnly),
            "regular" => Ok(PackageType::Regular),
            "promotional" => Ok(PackageType::Promotional),
            other => Err(DomainError::validation(format!(
                "unknown package type: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for PackageType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sellable bundle: fixed quantities of component products sold as one
/// line item (a bottle-service set, a beer bucket, a tasting flight).
///
/// Read-only to the stock engine; selling a package deducts its components,
/// never the package itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    id: PackageId,
    venue_id: VenueId,
    name: String,
    package_type: PackageType,
    base_price: Decimal,
    cost_price: Option<Decimal>,
    version: u64,
    created_at: DateTime<Utc>,
}

impl Package {
    pub fn new(
        id: PackageId,
        venue_id: VenueId,
        name: impl Into<String>,
        package_type: PackageType,
        base_price: Decimal,
        cost_price: Option<Decimal>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("package name cannot be empty"));
        }
        if base_price < Decimal::ZERO {
            return Err(DomainError::validation("base price cannot be negative"));
        }
        if cost_price.is_some_and(|cost| cost < Decimal::ZERO) {
            return Err(DomainError::validation("cost price cannot be negative"));
        }

        Ok(Self {
            id,
            venue_id,
            name,
            package_type,
            base_price,
            cost_price,
            version: 1,
            created_at,
        })
    }

    /// Rebuild a record from storage. Skips creation validation; the row
    /// was validated when first written.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: PackageId,
        venue_id: VenueId,
        name: String,
        package_type: PackageType,
        base_price: Decimal,
        cost_price: Option<Decimal>,
        version: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            venue_id,
            name,
            package_type,
            base_price,
            cost_price,
            version,
            created_at,
        }
    }

    pub fn id_typed(&self) -> PackageId {
        self.id
    }

    pub fn venue_id(&self) -> VenueId {
        self.venue_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package_type(&self) -> PackageType {
        self.package_type
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn cost_price(&self) -> Option<Decimal> {
        self.cost_price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Package {
    type Id = PackageId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// One edge of the package/product relation: "this package needs
/// `required_quantity` of this product per unit sold".
///
/// Static configuration. `required_quantity > 0` holds for every edge by
/// construction; the relation is bipartite (packages reference products,
/// never other packages), so no cycle handling exists anywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageComponent {
    pub package_id: PackageId,
    pub product_id: ProductId,
    pub required_quantity: Decimal,
}

impl PackageComponent {
    pub fn new(
        package_id: PackageId,
        product_id: ProductId,
        required_quantity: Decimal,
    ) -> Result<Self, DomainError> {
        if required_quantity <= Decimal::ZERO {
            return Err(DomainError::validation(
                "component required_quantity must be positive",
            ));
        }
        Ok(Self {
            package_id,
            product_id,
            required_quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_package_id() -> PackageId {
        PackageId::new(EntityId::new())
    }

    fn test_product_id() -> ProductId {
        ProductId::new(EntityId::new())
    }

    #[test]
    fn new_package_rejects_empty_name() {
        let err = Package::new(
            test_package_id(),
            VenueId::new(),
            "",
            PackageType::Regular,
            dec!(45),
            None,
            Utc::now(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn new_package_rejects_negative_prices() {
        let err = Package::new(
            test_package_id(),
            VenueId::new(),
            "Beer Bucket",
            PackageType::Promotional,
            dec!(-1),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = Package::new(
            test_package_id(),
            VenueId::new(),
            "Beer Bucket",
            PackageType::Promotional,
            dec!(30),
            Some(dec!(-0.01)),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn component_requires_positive_quantity() {
        for qty in [dec!(0), dec!(-2)] {
            let err =
                PackageComponent::new(test_package_id(), test_product_id(), qty).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }

        let component =
            PackageComponent::new(test_package_id(), test_product_id(), dec!(0.5)).unwrap();
        assert_eq!(component.required_quantity, dec!(0.5));
    }

    #[test]
    fn package_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(PackageType::VipOnly).unwrap(),
            serde_json::Value::String("vip_only".to_string())
        );
        assert_eq!(
            serde_json::to_value(PackageType::Promotional).unwrap(),
            serde_json::Value::String("promotional".to_string())
        );
    }
}
