use super::*;
use crate::types::Operator;
use yare::parameterized;


const TEST_POLICY: &str = r#"
{
    "providers": ["csp1", "csp2"],
    "attributes": [
        { "name": "patient/pat_id", "providers": ["csp1", "csp2"] },
        { "name": "patient/pat_name", "providers": ["csp2"], "protected_as": "csp2/*/*/pat_name_enc" },
        { "name": "patient/pat_last1", "providers": ["csp1"] },
        { "name": "patient/pat_last2", "providers": ["csp2"] }
    ]
}
"#;

const TEST_POLICY_SINGLE_PROVIDER: &str = r#"
{
    "providers": ["csp1", "csp2"],
    "default_provider": "csp2",
    "attributes": [
        { "name": "patient/pat_id", "providers": ["csp1"] }
    ]
}
"#;

fn operations() -> DataOperations {
    DataOperations::new_from_str(TEST_POLICY).expect("policy should load")
}

fn table(rows: &[&[&str]]) -> Table {
    rows.iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn eq(name: &str, value: &str) -> Criteria {
    Criteria::new(name, Operator::Eq, value)
}

/// One command per provider, in provider order, each with a mapping whose
/// values line up with its protected names.
fn assert_command_invariants(operations: &DataOperations, commands: &[OperationCommand]) {
    let policy = operations.policy().unwrap();
    assert_eq!(commands.len(), policy.providers().len());
    for (command, provider) in commands.iter().zip(policy.providers()) {
        assert_eq!(command.provider(), provider);
        assert_eq!(command.mapping().len(), command.protected_attribute_names().len());
        for (k, value) in command.mapping().values().enumerate() {
            assert_eq!(command.protected_attribute_names()[k], value);
        }
    }
}

fn protected(command: &OperationCommand) -> Vec<&str> {
    command
        .protected_attribute_names()
        .iter()
        .map(String::as_str)
        .collect()
}

#[parameterized(
    get = { OperationKind::Get },
    post = { OperationKind::Post },
    put = { OperationKind::Put },
    delete = { OperationKind::Delete },
)]
fn test_every_operation_covers_every_provider(kind: OperationKind) {
    let ops = operations();
    let names = ["pg/patient/pat_id", "pg/patient/pat_name", "episode/ep_id"];
    let contents = table(&[&["1", "Ann", "e1"]]);
    let criteria = [eq("pg/patient/pat_last1", "Smith")];

    let commands = match kind {
        OperationKind::Get => ops.get(&names, &criteria),
        OperationKind::Post => ops.post(&names, &contents),
        OperationKind::Put => ops.put(&names, &criteria, &contents),
        OperationKind::Delete => ops.delete(&names, &criteria),
        _ => unreachable!(),
    }
    .unwrap();

    assert_command_invariants(&ops, &commands);
    for command in &commands {
        assert_eq!(command.attribute_names(), &names);
    }
}

#[parameterized(
    too_many_segments = { "a/b/c/d" },
    empty_segment = { "a//c" },
    empty_leaf = { "patient/" },
)]
fn test_malformed_names_abort(name: &str) {
    let ops = operations();
    let expected = MediatorError::MalformedName(name.to_string());
    assert_eq!(ops.get(&[name], &[]).unwrap_err(), expected);
    assert_eq!(ops.head(&[name]).unwrap_err(), expected);
    assert_eq!(
        ops.get(&["pat_id"], &[eq(name, "1")]).unwrap_err(),
        expected
    );
}

#[test]
fn test_commands_get_distinct_ids() {
    let ops = operations();
    let first = ops.get(&["pat_id"], &[]).unwrap();
    let second = ops.clone().get(&["pat_id"], &[]).unwrap();
    let mut ids: Vec<u64> = first.iter().chain(&second).map(|c| c.id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
