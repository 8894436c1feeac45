//! Request-level entry points tying a source and a catalog to the engine
//!
//! Each call fetches the records it needs, runs the pure analysis functions
//! and returns a report echoing the request parameters. Nothing is cached
//! between calls.

use crate::aggregation::{aggregate, AggregatedFlow, DataQuality};
use crate::catalog::NodeCatalog;
use crate::config::AnalysisConfig;
use crate::corridors::{pair_totals, top_city_corridors, top_province_corridors, CorridorRecord};
use crate::data::{AggregationRequest, DateMode, Direction, GroupLevel, NodeId, Period};
use crate::error::Result;
use crate::source::FlowSource;
use crate::tensor::{pair_series, FillPolicy, FlowTensor, PairSeries, TensorBuilder};
use flow_math::{ForecastMethod, NoisyReplay, NumArray};
use serde::Serialize;

/// Parameters of a corridor analysis; unset limits fall back to the config
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorRequest {
    pub period_type: String,
    pub period: Period,
    pub date_mode: DateMode,
    pub topk: Option<i64>,
    pub topk_intra: Option<i64>,
    pub topk_inter: Option<i64>,
    pub dyna_type: Option<String>,
}

impl CorridorRequest {
    pub fn new(period_type: impl Into<String>, period: Period) -> Self {
        Self {
            period_type: period_type.into(),
            period,
            date_mode: DateMode::Total,
            topk: None,
            topk_intra: None,
            topk_inter: None,
            dyna_type: None,
        }
    }

    pub fn with_topk(mut self, topk: i64) -> Self {
        self.topk = Some(topk);
        self
    }

    pub fn with_city_topk(mut self, topk_intra: i64, topk_inter: i64) -> Self {
        self.topk_intra = Some(topk_intra);
        self.topk_inter = Some(topk_inter);
        self
    }

    pub fn with_dyna_type(mut self, dyna_type: Option<String>) -> Self {
        self.dyna_type = dyna_type;
        self
    }
}

/// Ranked flow per node or province
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReport {
    pub period_type: String,
    pub date_mode: DateMode,
    pub direction: Direction,
    pub level: GroupLevel,
    pub total_records: usize,
    pub data: Vec<AggregatedFlow>,
    pub data_quality: DataQuality,
}

/// Top province corridors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceCorridorReport {
    pub period_type: String,
    pub date_mode: DateMode,
    pub topk: i64,
    pub total_records: usize,
    pub data: Vec<CorridorRecord>,
    pub data_quality: DataQuality,
}

/// Top city corridors, split by class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityCorridorReport {
    pub period_type: String,
    pub date_mode: DateMode,
    pub topk_intra: i64,
    pub topk_inter: i64,
    pub intra_province: Vec<CorridorRecord>,
    pub inter_province: Vec<CorridorRecord>,
    pub data_quality: DataQuality,
}

/// Forecast continuation of a flow tensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub method: ForecastMethod,
    pub horizon: i64,
    pub ids: Vec<NodeId>,
    pub tensor: NumArray,
}

/// Flow analysis over a record source and a node catalog
#[derive(Debug, Clone)]
pub struct FlowAnalyzer<S, C> {
    source: S,
    catalog: C,
    config: AnalysisConfig,
}

impl<S: FlowSource, C: NodeCatalog> FlowAnalyzer<S, C> {
    pub fn new(source: S, catalog: C) -> Self {
        Self::with_config(source, catalog, AnalysisConfig::default())
    }

    pub fn with_config(source: S, catalog: C, config: AnalysisConfig) -> Self {
        Self {
            source,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Flow intensity and ranking per province
    pub fn province_flow(&self, request: &AggregationRequest) -> Result<FlowReport> {
        self.flow_report(request, GroupLevel::Province)
    }

    /// Flow intensity and ranking per city node
    pub fn city_flow(&self, request: &AggregationRequest) -> Result<FlowReport> {
        self.flow_report(request, GroupLevel::Node)
    }

    fn flow_report(&self, request: &AggregationRequest, level: GroupLevel) -> Result<FlowReport> {
        let records = self
            .source
            .fetch_flows(&request.period, request.dyna_type.as_deref())?;
        let aggregation = aggregate(&records, request, level, &self.catalog);
        if aggregation.entries.is_empty() {
            log::debug!("no {} flow in {:?}", level, request.period);
        }

        Ok(FlowReport {
            period_type: request.period_type.clone(),
            date_mode: request.date_mode,
            direction: request.direction,
            level,
            total_records: aggregation.entries.len(),
            data: aggregation.entries,
            data_quality: aggregation.quality,
        })
    }

    /// Strongest province-to-province corridors
    pub fn province_corridors(&self, request: &CorridorRequest) -> Result<ProvinceCorridorReport> {
        let topk = request.topk.unwrap_or(self.config.topk);
        let records = self
            .source
            .fetch_flows(&request.period, request.dyna_type.as_deref())?;
        let pairs = pair_totals(&records, &request.period, request.dyna_type.as_deref());
        let result = top_province_corridors(&pairs, &self.catalog, topk)?;

        Ok(ProvinceCorridorReport {
            period_type: request.period_type.clone(),
            date_mode: request.date_mode,
            topk,
            total_records: result.corridors.len(),
            data: result.corridors,
            data_quality: result.quality,
        })
    }

    /// Strongest city corridors, within and across provinces
    pub fn city_corridors(&self, request: &CorridorRequest) -> Result<CityCorridorReport> {
        let topk_intra = request.topk_intra.unwrap_or(self.config.topk_intra);
        let topk_inter = request.topk_inter.unwrap_or(self.config.topk_inter);
        let records = self
            .source
            .fetch_flows(&request.period, request.dyna_type.as_deref())?;
        let pairs = pair_totals(&records, &request.period, request.dyna_type.as_deref());
        let result = top_city_corridors(&pairs, &self.catalog, topk_intra, topk_inter)?;

        Ok(CityCorridorReport {
            period_type: request.period_type.clone(),
            date_mode: request.date_mode,
            topk_intra,
            topk_inter,
            intra_province: result.intra_province,
            inter_province: result.inter_province,
            data_quality: result.quality,
        })
    }

    /// Dense OD tensor over every catalog node
    pub fn od_tensor(
        &self,
        period: &Period,
        dyna_type: Option<&str>,
        fill: Option<FillPolicy>,
    ) -> Result<FlowTensor> {
        let records = self.source.fetch_flows(period, dyna_type)?;
        let builder = TensorBuilder::new(fill.unwrap_or(self.config.fill))
            .with_ids(self.catalog.node_ids());
        Ok(builder.build(&records, period))
    }

    /// Time series of one origin/destination pair
    pub fn pair_series(
        &self,
        period: &Period,
        origin_id: NodeId,
        destination_id: NodeId,
        dyna_type: Option<&str>,
        fill: Option<FillPolicy>,
    ) -> Result<PairSeries> {
        let records = self.source.fetch_flows(period, dyna_type)?;
        Ok(pair_series(
            &records,
            period,
            origin_id,
            destination_id,
            fill.unwrap_or(self.config.fill),
        ))
    }

    /// The observed OD tensor with every present cell perturbed by the
    /// configured noise ratio; a stand-in prediction for scoring demos
    pub fn noisy_od_tensor(
        &self,
        period: &Period,
        dyna_type: Option<&str>,
        fill: Option<FillPolicy>,
    ) -> Result<FlowTensor> {
        let mut tensor = self.od_tensor(period, dyna_type, fill)?;
        let noisy = self.replay()?.perturb(&tensor.to_num_array()).values();
        let cells = tensor.tensor.iter_mut().flatten().flatten();
        for (cell, value) in cells.zip(noisy) {
            *cell = value;
        }
        Ok(tensor)
    }

    /// One pair's observed series with every present value perturbed
    pub fn noisy_pair_series(
        &self,
        period: &Period,
        origin_id: NodeId,
        destination_id: NodeId,
        dyna_type: Option<&str>,
        fill: Option<FillPolicy>,
    ) -> Result<PairSeries> {
        let mut series = self.pair_series(period, origin_id, destination_id, dyna_type, fill)?;
        let observed = NumArray::Vector(series.series);
        series.series = self.replay()?.perturb(&observed).values();
        Ok(series)
    }

    fn replay(&self) -> Result<NoisyReplay> {
        Ok(NoisyReplay::new(
            self.config.noise_ratio,
            self.config.noise_seed,
        )?)
    }

    /// Continue `history` by `horizon` steps with the given or configured method
    pub fn predict(
        &self,
        history: &FlowTensor,
        horizon: i64,
        method: Option<ForecastMethod>,
    ) -> Result<Prediction> {
        let method = method.unwrap_or(self.config.forecast_method);
        let forecaster = self.config.forecaster_for(method)?;
        let tensor = forecaster.forecast(&history.to_num_array(), horizon)?;
        log::debug!(
            "{} forecast of {} steps over {} nodes",
            forecaster.name(),
            horizon,
            history.n()
        );

        Ok(Prediction {
            method,
            horizon,
            ids: history.ids.clone(),
            tensor,
        })
    }
}
