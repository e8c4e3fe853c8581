//! Table rendering of management objects.

use super::terminal::{color_status, format_field};
use crate::models::{Deployment, HostedService, Location, Operation, StorageService};

pub fn hosted_services_table(services: &[HostedService]) -> Vec<String> {
    let mut rows = vec![format!(
        "{} {} {} {}",
        format_field("NAME", 24),
        format_field("LOCATION", 22),
        format_field("STATUS", 10),
        "LABEL"
    )];
    for s in services {
        let status = s.properties.status.clone().unwrap_or_else(|| "-".into());
        rows.push(format!(
            "{} {} {} {}",
            format_field(&s.service_name, 24),
            format_field(s.placement(), 22),
            color_status(&format_field(&status, 10)),
            s.label().unwrap_or_default()
        ));
    }
    rows
}

pub fn hosted_service_details(service: &HostedService) -> Vec<String> {
    let p = &service.properties;
    let mut rows = vec![
        format!("Name:        {}", service.service_name),
        format!("Label:       {}", service.label().unwrap_or_default()),
        format!("Description: {}", p.description.clone().unwrap_or_default()),
        format!("Location:    {}", service.placement()),
        format!(
            "Status:      {}",
            color_status(p.status.as_deref().unwrap_or("-"))
        ),
        format!(
            "Created:     {}",
            service
                .created()
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "-".into())
        ),
    ];
    if let Some(ref list) = service.deployments {
        for d in &list.deployments {
            rows.push(format!(
                "Deployment:  {} [{}] {}",
                d.name,
                d.slot.as_deref().unwrap_or("-"),
                color_status(d.status.as_deref().unwrap_or("-"))
            ));
        }
    }
    rows
}

pub fn deployment_details(deployment: &Deployment) -> Vec<String> {
    let mut rows = vec![
        format!("Name:   {}", deployment.name),
        format!("Slot:   {}", deployment.slot.as_deref().unwrap_or("-")),
        format!(
            "Status: {}",
            color_status(deployment.status.as_deref().unwrap_or("-"))
        ),
        format!("Label:  {}", deployment.label().unwrap_or_default()),
        format!("Url:    {}", deployment.url.as_deref().unwrap_or("-")),
        format!(
            "{} {} {} {}",
            format_field("ROLE", 16),
            format_field("INSTANCE", 20),
            format_field("STATUS", 14),
            "IP"
        ),
    ];
    for i in &deployment.role_instances.instances {
        let status = i.instance_status.clone().unwrap_or_else(|| "-".into());
        rows.push(format!(
            "{} {} {} {}",
            format_field(&i.role_name, 16),
            format_field(&i.instance_name, 20),
            color_status(&format_field(&status, 14)),
            i.ip_address.as_deref().unwrap_or("-")
        ));
    }
    rows
}

pub fn storage_services_table(accounts: &[StorageService]) -> Vec<String> {
    let mut rows = vec![format!(
        "{} {} {} {} {}",
        format_field("NAME", 24),
        format_field("LOCATION", 18),
        format_field("TYPE", 14),
        format_field("STATUS", 10),
        "BLOB ENDPOINT"
    )];
    for a in accounts {
        let p = &a.properties;
        let status = p.status.clone().unwrap_or_else(|| "-".into());
        rows.push(format!(
            "{} {} {} {} {}",
            format_field(&a.service_name, 24),
            format_field(p.location.as_deref().unwrap_or("-"), 18),
            format_field(p.account_type.as_deref().unwrap_or("-"), 14),
            color_status(&format_field(&status, 10)),
            a.blob_endpoint().unwrap_or("-")
        ));
    }
    rows
}

pub fn locations_table(locations: &[Location]) -> Vec<String> {
    let mut rows = vec![format!("{} {}", format_field("NAME", 22), "SERVICES")];
    for l in locations {
        rows.push(format!(
            "{} {}",
            format_field(&l.name, 22),
            l.available_services.services.join(", ")
        ));
    }
    rows
}

pub fn operation_details(operation: &Operation) -> Vec<String> {
    let mut rows = vec![
        format!("Id:     {}", operation.id),
        format!("Status: {}", color_status(&operation.status)),
    ];
    if let Some(code) = operation.http_status_code {
        rows.push(format!("HTTP:   {code}"));
    }
    if let Some(ref e) = operation.error {
        rows.push(format!(
            "Error:  [{}] {}",
            e.code.as_deref().unwrap_or("-"),
            e.message.as_deref().unwrap_or("-")
        ));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{from_xml, HostedServiceList, StorageServiceList};

    #[test]
    fn test_hosted_services_table() {
        colored::control::set_override(false);
        let list: HostedServiceList =
            from_xml(include_str!("../tests/test_data/hosted_services.xml")).unwrap();
        let rows = hosted_services_table(&list.hosted_services);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("NAME"));
        assert!(rows[1].starts_with("contoso-web"));
        assert!(rows[1].ends_with("contoso web"));
        assert!(rows[2].contains("affinity:contoso-ag"));
    }

    #[test]
    fn test_storage_table() {
        colored::control::set_override(false);
        let list: StorageServiceList =
            from_xml(include_str!("../tests/test_data/storage_services.xml")).unwrap();
        let rows = storage_services_table(&list.storage_services);
        assert!(rows[1].ends_with("https://contosostore.blob.core.windows.net/"));
    }

    #[test]
    fn test_operation_details() {
        colored::control::set_override(false);
        let op = Operation::from_body(include_str!("../tests/test_data/operation_failed.xml"))
            .unwrap();
        let rows = operation_details(&op);
        assert_eq!(rows[1], "Status: Failed");
        assert!(rows[3].starts_with("Error:  [ConflictError]"));
    }
}
