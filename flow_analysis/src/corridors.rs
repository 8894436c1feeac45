//! Corridor ranking: the strongest origin/destination pairs
//!
//! Pairs are summed over the whole period. Self-pairs never count as a
//! corridor. City corridors are split into intra- and inter-province classes
//! that are ranked and truncated independently; province corridors are a
//! single, always cross-province class.

use crate::aggregation::{group_name, DataQuality};
use crate::catalog::NodeCatalog;
use crate::data::{FlowRecord, GroupLevel, NodeId, Period};
use crate::error::{AnalysisError, Result};
use crate::ranking::{dense_rank, Ranked};
use serde::Serialize;
use std::collections::BTreeMap;

/// Total flow along one directed node pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairFlow {
    pub origin_id: NodeId,
    pub destination_id: NodeId,
    pub flow: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorType {
    IntraProvince,
    InterProvince,
}

/// A ranked corridor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorridorRecord {
    pub origin_group: String,
    pub destination_group: String,
    pub flow: f64,
    pub rank: u32,
    /// Only set for city corridors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corridor_type: Option<CorridorType>,
}

impl Ranked for CorridorRecord {
    fn flow(&self) -> f64 {
        self.flow
    }

    fn tie_key(&self) -> (&str, &str) {
        (&self.origin_group, &self.destination_group)
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}

/// Top city corridors of both classes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CityCorridors {
    pub intra_province: Vec<CorridorRecord>,
    pub inter_province: Vec<CorridorRecord>,
    pub quality: DataQuality,
}

/// Top province corridors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProvinceCorridors {
    pub corridors: Vec<CorridorRecord>,
    pub quality: DataQuality,
}

/// Validate a top-K limit: zero is allowed and means "none", negative is not
pub fn check_topk(class: &'static str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| AnalysisError::InvalidTopK { class, value })
}

/// Sum flows per directed pair over the records inside `period`.
///
/// Self-pairs are dropped. Pairs come out ordered by `(origin, destination)`.
pub fn pair_totals(records: &[FlowRecord], period: &Period, dyna_type: Option<&str>) -> Vec<PairFlow> {
    let mut totals: BTreeMap<(NodeId, NodeId), f64> = BTreeMap::new();
    for r in records
        .iter()
        .filter(|r| period.contains(r.time()) && r.matches_type(dyna_type))
        .filter(|r| r.origin_id() != r.destination_id())
    {
        *totals.entry((r.origin_id(), r.destination_id())).or_insert(0.0) += r.flow();
    }
    totals
        .into_iter()
        .map(|((origin_id, destination_id), flow)| PairFlow {
            origin_id,
            destination_id,
            flow,
        })
        .collect()
}

/// Dense-rank corridors and keep the first `topk`
pub fn rank_and_truncate(mut corridors: Vec<CorridorRecord>, topk: usize) -> Vec<CorridorRecord> {
    dense_rank(&mut corridors);
    corridors.truncate(topk);
    corridors
}

/// Rank city corridors, split by whether both ends share a province.
///
/// A pair whose endpoint is unknown or has no province cannot be classified
/// and is reported in the data quality summary instead.
pub fn top_city_corridors<C: NodeCatalog + ?Sized>(
    pairs: &[PairFlow],
    catalog: &C,
    topk_intra: i64,
    topk_inter: i64,
) -> Result<CityCorridors> {
    let topk_intra = check_topk("intra_province", topk_intra)?;
    let topk_inter = check_topk("inter_province", topk_inter)?;

    let mut quality = DataQuality::default();
    let mut intra = Vec::new();
    let mut inter = Vec::new();

    for pair in pairs.iter().filter(|p| p.origin_id != p.destination_id) {
        let Some((origin, origin_province)) = city_and_province(catalog, pair.origin_id) else {
            quality.exclude(pair.origin_id, pair.flow);
            continue;
        };
        let Some((destination, destination_province)) =
            city_and_province(catalog, pair.destination_id)
        else {
            quality.exclude(pair.destination_id, pair.flow);
            continue;
        };

        let corridor_type = if origin_province == destination_province {
            CorridorType::IntraProvince
        } else {
            CorridorType::InterProvince
        };
        let record = CorridorRecord {
            origin_group: origin,
            destination_group: destination,
            flow: pair.flow,
            rank: 0,
            corridor_type: Some(corridor_type),
        };
        match corridor_type {
            CorridorType::IntraProvince => intra.push(record),
            CorridorType::InterProvince => inter.push(record),
        }
    }

    quality.report("city corridor analysis");
    Ok(CityCorridors {
        intra_province: rank_and_truncate(intra, topk_intra),
        inter_province: rank_and_truncate(inter, topk_inter),
        quality,
    })
}

/// Rank province-to-province corridors, summing all member nodes
pub fn top_province_corridors<C: NodeCatalog + ?Sized>(
    pairs: &[PairFlow],
    catalog: &C,
    topk: i64,
) -> Result<ProvinceCorridors> {
    let topk = check_topk("province", topk)?;

    let mut quality = DataQuality::default();
    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    for pair in pairs {
        let origin = group_name(catalog, pair.origin_id, GroupLevel::Province);
        let destination = group_name(catalog, pair.destination_id, GroupLevel::Province);
        match (origin, destination) {
            (Some(o), Some(d)) if o != d => *totals.entry((o, d)).or_insert(0.0) += pair.flow,
            (Some(_), Some(_)) => {}
            (None, _) => quality.exclude(pair.origin_id, pair.flow),
            (_, None) => quality.exclude(pair.destination_id, pair.flow),
        }
    }

    quality.report("province corridor analysis");
    let corridors = totals
        .into_iter()
        .map(|((origin_group, destination_group), flow)| CorridorRecord {
            origin_group,
            destination_group,
            flow,
            rank: 0,
            corridor_type: None,
        })
        .collect();

    Ok(ProvinceCorridors {
        corridors: rank_and_truncate(corridors, topk),
        quality,
    })
}

fn city_and_province<C: NodeCatalog + ?Sized>(catalog: &C, id: NodeId) -> Option<(String, String)> {
    let node = catalog.resolve_node(id)?;
    Some((node.name.clone(), node.province.clone()?))
}
