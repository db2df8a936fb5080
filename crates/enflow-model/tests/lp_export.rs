use enflow_core::{Bus, EnergySystem, Flow, Groupings, Sink, Source};
use std::collections::HashSet;
use enflow_model::{build_operational_model, ModelConfig};
use std::io::Write;

fn small_system() -> EnergySystem {
    let mut es = EnergySystem::new(0..2).with_groupings(Groupings::standard());
    let el = es.add_component(Bus::new("el")).unwrap();
    let grid = es.add_component(Source::new("grid")).unwrap();
    let demand = es.add_component(Sink::new("demand")).unwrap();
    es.connect(grid, el, Flow::new().with_nominal_value(20.0).with_variable_costs(3.0))
        .unwrap();
    es.connect(el, demand, Flow::new().fixed(vec![4.0, 6.0]))
        .unwrap();
    es
}

#[test]
fn lp_file_contains_all_sections() {
    let model = build_operational_model(&small_system(), &ModelConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.lp");

    model.write_lp(&path).expect("LP export should succeed");
    let lp = std::fs::read_to_string(&path).unwrap();

    assert!(lp.starts_with("\\* OperationalModel *\\"));
    assert!(lp.contains("Minimize"));
    assert!(lp.contains("+ 3 x1_flow_grid_el_0_1"));
    assert!(lp.contains("bus_balance_el_0_1:"));
    assert!(lp.contains("0 <= x0_flow_grid_el_0_0 <= 20"));
    assert!(lp.contains("x3_flow_el_demand_0_1 = 6"));
    assert!(lp.trim_end().ends_with("End"));
}

#[test]
fn labels_with_underscores_keep_distinct_columns() {
    let mut es = EnergySystem::new(0..1);
    let a_b = es.add_component(Source::new("a_b")).unwrap();
    let c = es.add_component(Sink::new("c")).unwrap();
    let a = es.add_component(Source::new("a")).unwrap();
    let b_c = es.add_component(Sink::new("b_c")).unwrap();
    es.connect(a_b, c, Flow::new().with_nominal_value(5.0))
        .unwrap();
    es.connect(a, b_c, Flow::new().with_nominal_value(7.0))
        .unwrap();

    let model = build_operational_model(&es, &ModelConfig::default()).unwrap();
    let first = model.flow_var("a_b", "c", 0, 0).unwrap();
    let second = model.flow_var("a", "b_c", 0, 0).unwrap();
    assert_ne!(first.name, second.name);

    let lp = model.to_lp_string();
    assert!(lp.contains(" 0 <= x0_flow_a_b_c_0_0 <= 5\n"));
    assert!(lp.contains(" 0 <= x1_flow_a_b_c_0_0 <= 7\n"));

    let bounds: Vec<&str> = lp
        .split("Bounds\n")
        .nth(1)
        .unwrap()
        .lines()
        .take_while(|line| *line != "End")
        .collect();
    assert_eq!(bounds.len(), model.num_variables());
    let columns: HashSet<&str> = bounds
        .iter()
        .map(|line| line.split_whitespace().nth(2).unwrap())
        .collect();
    assert_eq!(columns.len(), 2, "every bound line names its own column");
}

#[test]
fn write_lp_reports_unwritable_path() {
    let model = build_operational_model(&small_system(), &ModelConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("model.lp");

    let err = model.write_lp(&path).unwrap_err();
    assert!(format!("{err:#}").contains("writing LP file"));
}

#[test]
fn config_file_drives_the_build() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name = \"from-file\"\ntime_increment = 2.0").unwrap();
    let config = ModelConfig::load_from(file.path()).unwrap();

    let model = build_operational_model(&small_system(), &config).unwrap();
    assert_eq!(model.name(), "from-file");

    let var = model.flow_id("grid", "el", 0, 0).unwrap();
    assert_eq!(model.objective().coefficient(var), 6.0);
}

#[test]
fn solution_exports_to_json() {
    let model = build_operational_model(&small_system(), &ModelConfig::default()).unwrap();
    let solution = model.solve().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solution.json");

    solution.to_json(&path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(json["objective"].as_f64().unwrap() > 0.0);
    assert_eq!(json["flow"].as_array().unwrap().len(), 4);
}
