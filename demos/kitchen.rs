use entity_acl::{Decision, Params, PolicyBuilder, Request, Result};

fn main() -> Result<()> {
    let json = r#"{
        "rules": {
            "cook": [
                {
                    "effect": "allow",
                    "resource": "kitchen",
                    "conditions": [
                        { "action": ["eat", "clean"] }
                    ]
                },
                {
                    "effect": "deny",
                    "resource": "kitchen"
                },
                {
                    "effect": "allow",
                    "conditions": "*"
                }
            ],
            "guest": {
                "oven": [
                    { "effect": "deny" }
                ],
                "": [
                    { "effect": "allow", "conditions": ["invitation"] }
                ]
            }
        }
    }"#;

    // Construct the policy.
    let policy = PolicyBuilder::from_json(json)
        .with_default_decision(Decision::Denied)
        .build()?;

    let mut params = Params::new();
    params.insert("action".into(), "eat".into());
    let request = Request::with_params("cook", "kitchen", params)?;

    let verdict = policy.evaluate(&request);
    let (entity, resource, decision) = (verdict.entity(), verdict.resource(), verdict.decision());
    println!("{entity} -> {resource}: {decision:?}");

    // resource specific deny wins over the guest's invitation.
    let mut params = Params::new();
    params.insert("invitation".into(), "yes".into());
    let request = Request::with_params("guest", "oven", params)?;
    assert!(!policy.check(&request));

    // unknown entities get the default decision.
    assert!(!policy.check(&Request::new("stranger", "kitchen")?));

    Ok(())
}
