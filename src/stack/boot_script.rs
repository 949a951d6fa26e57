//! First-boot script for the compute instance.
//!
//! Rendered once when the instance is created. Adopted instances keep
//! whatever script they booted with.

const CLOUDWATCH_AGENT_CONFIG: &str = r#"{
	"agent": {
		"run_as_user": "root"
	},
	"logs": {
		"logs_collected": {
			"files": {
				"collect_list": [
					{
						"file_path": "/var/log/cloud-init-output.log",
						"log_group_name": "/ec2/log/ec2-example/",
						"log_stream_name": "{instance_id}-cloud-init-output",
						"retention_in_days": 7
					},
					{
						"file_path": "/var/log/cloud-init.log",
						"log_group_name": "/ec2/log/ec2-example/",
						"log_stream_name": "{instance_id}-cloud-init",
						"retention_in_days": 7
					}
				]
			}
		}
	}
}"#;

/// Render the boot script.
///
/// `bucket` is spliced in verbatim, so it may be a `${assetBucket.id}`
/// reference that resolves at apply time. Without an SSH key no key is
/// appended to `authorized_keys`.
pub fn render(stack_name: &str, bucket: &str, ssh_pub_key: Option<&str>) -> String {
    let mut lines = vec![
        "#!/bin/bash -xe".to_string(),
        "yum update -y".to_string(),
        "curl -sL https://dl.yarnpkg.com/rpm/yarn.repo | sudo tee /etc/yum.repos.d/yarn.repo"
            .to_string(),
        "curl -sL https://rpm.nodesource.com/setup_18.x | sudo -E bash -".to_string(),
        "yum install -y amazon-cloudwatch-agent nodejs python3-pip zip unzip docker yarn"
            .to_string(),
        "sudo systemctl enable docker".to_string(),
        "sudo systemctl start docker".to_string(),
        "mkdir -p /home/ec2-user/sample".to_string(),
        format!(
            "aws s3 cp s3://{}/sample /home/ec2-user/sample --recursive",
            bucket
        ),
        String::new(),
        "# Configure CloudWatch Agent".to_string(),
        "cat > /tmp/amazon-cloudwatch-agent.json << 'EOF'".to_string(),
        CLOUDWATCH_AGENT_CONFIG.to_string(),
        "EOF".to_string(),
        String::new(),
        "cat > /etc/config.json << EOF".to_string(),
        format!("{{\n  \"STACK_ID\": \"{}\"\n}}", stack_name),
        "EOF".to_string(),
        String::new(),
        "cat > /etc/config.sh << 'EOF'".to_string(),
        "#!/bin/bash -xe".to_string(),
        "/opt/aws/amazon-cloudwatch-agent/bin/amazon-cloudwatch-agent-ctl -a fetch-config -m ec2 -s -c file:/tmp/amazon-cloudwatch-agent.json".to_string(),
        "EOF".to_string(),
        String::new(),
        "chmod +x /etc/config.sh".to_string(),
        "/etc/config.sh".to_string(),
    ];

    if let Some(key) = ssh_pub_key {
        lines.push(String::new());
        lines.push(format!(
            "echo \"{}\" >> /home/ec2-user/.ssh/authorized_keys",
            key
        ));
    }

    let mut script = lines.join("\n");
    script.push('\n');
    script
}
