//! Grouping-driven constraint blocks.

use enflow_core::{
    bus_label_grouping, Bus, Component, EnergySystem, Flow, GroupKey, Grouping, Groupings, Sink,
    Source, Storage,
};
use enflow_model::blocks::{BusBalance, ConstraintBlock};
use enflow_model::{
    build_operational_model, BlockRegistry, ModelBuilder, ModelConfig, ModelError, Sense,
};

fn two_inflow_bus() -> EnergySystem {
    let mut es =
        EnergySystem::new(0..3).with_groupings(Groupings::new().with(bus_label_grouping("el")));
    let bus = es.add_component(Bus::new("el_main")).unwrap();
    let a = es.add_component(Source::new("a")).unwrap();
    let b = es.add_component(Source::new("b")).unwrap();
    let demand = es.add_component(Sink::new("demand")).unwrap();
    es.connect(a, bus, Flow::new()).unwrap();
    es.connect(b, bus, Flow::new()).unwrap();
    es.connect(bus, demand, Flow::new()).unwrap();
    es
}

#[test]
fn marked_bus_balances_inflows_and_outflow() {
    let es = two_inflow_bus();
    let members = es.groups().get(&GroupKey::BusBalance).expect("bus should be grouped");
    assert_eq!(members.len(), 1);

    let model = build_operational_model(&es, &ModelConfig::default()).unwrap();
    let balances = model.constraints("bus_balance");
    assert_eq!(balances.len(), 3, "one balance per timestep");

    for (t, c) in balances.iter().enumerate() {
        let in_a = model.flow_id("a", "el_main", 0, t).unwrap();
        let in_b = model.flow_id("b", "el_main", 0, t).unwrap();
        let out = model.flow_id("el_main", "demand", 0, t).unwrap();

        assert_eq!(c.sense, Sense::Eq);
        assert_eq!(c.rhs, 0.0);
        assert_eq!(c.expr.terms().len(), 3);
        assert_eq!(c.expr.coefficient(in_a), 1.0);
        assert_eq!(c.expr.coefficient(in_b), 1.0);
        assert_eq!(c.expr.coefficient(out), -1.0);
    }
}

#[test]
fn unmarked_bus_gets_no_balance() {
    let mut es =
        EnergySystem::new(0..3).with_groupings(Groupings::new().with(bus_label_grouping("el")));
    let heat = es.add_component(Bus::new("heat")).unwrap();
    let boiler = es.add_component(Source::new("boiler")).unwrap();
    es.connect(boiler, heat, Flow::new()).unwrap();

    let model = build_operational_model(&es, &ModelConfig::default()).unwrap();
    assert!(model.constraints("bus_balance").is_empty());
    assert!(model.blocks().is_empty());
}

#[test]
fn custom_group_key_uses_registered_block() {
    let heat_grouping = Grouping::new("heat_buses", |c| match c {
        Component::Bus(b) if b.label.starts_with("heat") => Some(GroupKey::custom("heat_balance")),
        _ => None,
    });
    let mut es = EnergySystem::new(0..2).with_groupings(Groupings::standard());
    es.set_groupings(Groupings::new().with(heat_grouping).with(enflow_core::constraint_grouping()));

    let heat = es.add_component(Bus::new("heat_net")).unwrap();
    let el = es.add_component(Bus::new("el")).unwrap();
    let boiler = es.add_component(Source::new("boiler")).unwrap();
    let grid = es.add_component(Source::new("grid")).unwrap();
    es.connect(boiler, heat, Flow::new()).unwrap();
    es.connect(grid, el, Flow::new()).unwrap();

    let mut builder = ModelBuilder::new(ModelConfig::default());
    builder
        .registry_mut()
        .register(GroupKey::custom("heat_balance"), |key| {
            Box::new(BusBalance::named(key.name()))
        });
    let model = builder.build_operational(&es).unwrap();

    assert_eq!(model.constraints("heat_balance").len(), 2);
    assert_eq!(model.constraints("bus_balance").len(), 2);
    assert_eq!(model.blocks(), ["heat_balance".to_string(), "bus_balance".to_string()]);
}

#[test]
fn unregistered_key_is_skipped_with_warning() {
    let mut es = EnergySystem::new(0..2).with_groupings(
        Groupings::new().with(Grouping::new("tagged", |c| match c {
            Component::Source(_) => Some(GroupKey::custom("emission_limit")),
            _ => None,
        })),
    );
    let el = es.add_component(Bus::new("el")).unwrap();
    let grid = es.add_component(Source::new("grid")).unwrap();
    es.connect(grid, el, Flow::new()).unwrap();

    let model = build_operational_model(&es, &ModelConfig::default()).unwrap();
    assert_eq!(model.num_constraints(), 0);
    let warnings: Vec<_> = model.diagnostics().warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].entity.as_deref(), Some("emission_limit"));
}

/// Block that caps the number of members it accepts.
struct Limited;

impl ConstraintBlock for Limited {
    fn name(&self) -> &str {
        "limited"
    }

    fn create(
        &mut self,
        _model: &mut enflow_model::Model,
        _es: &EnergySystem,
        nodes: &[enflow_core::NodeIndex],
    ) -> enflow_model::ModelResult<()> {
        if nodes.len() > 1 {
            return Err(ModelError::Block {
                block: self.name().to_string(),
                message: format!("{} members, at most 1 supported", nodes.len()),
            });
        }
        Ok(())
    }
}

#[test]
fn block_failure_aborts_build() {
    let mut es = EnergySystem::new(0..2).with_groupings(Groupings::standard());
    es.add_component(Bus::new("a")).unwrap();
    es.add_component(Bus::new("b")).unwrap();

    let mut registry = BlockRegistry::new();
    registry.register(GroupKey::BusBalance, |_| Box::new(Limited));
    let err = ModelBuilder::new(ModelConfig::default())
        .with_registry(registry)
        .build_operational(&es)
        .unwrap_err();
    assert!(matches!(err, ModelError::Block { ref block, .. } if block == "limited"));
}

#[test]
fn storage_input_nominal_value_comes_from_capacity() {
    let mut es = EnergySystem::new(0..3).with_groupings(Groupings::standard());
    let el = es.add_component(Bus::new("el")).unwrap();
    let battery = es
        .add_component(
            Storage::new("battery", 100.0)
                .with_initial_capacity(40.0)
                .with_capacity_loss(0.1)
                .with_conversion_factors(0.9, 0.8),
        )
        .unwrap();

    es.connect(el, battery, Flow::new().with_nominal_value(75.0))
        .unwrap();
    es.connect(battery, el, Flow::new()).unwrap();

    assert_eq!(es.diagnostics().warning_count(), 1, "overwrite must be reported");
    let model = build_operational_model(&es, &ModelConfig::default()).unwrap();
    assert_eq!(model.flow_var("el", "battery", 0, 0).unwrap().upper, 20.0);
    assert_eq!(model.flow_var("battery", "el", 0, 0).unwrap().upper, 20.0);

    let levels = model.constraints("storage_balance");
    assert_eq!(levels.len(), 3);

    let level0 = model.block_variable("storage_balance", "battery", 0, 0).unwrap();
    let level1 = model.block_variable("storage_balance", "battery", 0, 1).unwrap();
    assert_eq!(model.variable(level1).unwrap().upper, 100.0);

    // t = 0 starts from the initial level
    assert!((levels[0].rhs - 36.0).abs() < 1e-12);
    let charge = model.flow_id("el", "battery", 0, 0).unwrap();
    let discharge = model.flow_id("battery", "el", 0, 0).unwrap();
    assert_eq!(levels[0].expr.coefficient(charge), -0.9);
    assert_eq!(levels[0].expr.coefficient(discharge), 1.25);

    // later steps link to the previous level
    assert_eq!(levels[1].rhs, 0.0);
    assert_eq!(levels[1].expr.coefficient(level1), 1.0);
    assert!((levels[1].expr.coefficient(level0) + 0.9).abs() < 1e-12);
}
