use std::collections::BTreeMap;

use super::{EnvName, ResourceMapping};

/// Physical ids of the stacks deployed before adoption.
pub(super) fn entries() -> BTreeMap<EnvName, ResourceMapping> {
    let mut entries = BTreeMap::new();

    entries.insert(
        EnvName::Dev,
        ResourceMapping {
            vpc: "vpc-00670458d2ea5bd69".to_string(),
            internet_gateway: "igw-07ca318fd167fc1c7".to_string(),
            public_subnet1: "subnet-0cff59825efa397f7".to_string(),
            public_subnet2: "subnet-051a9fcd8fa3e1516".to_string(),
            route_table1: "rtb-04da744c73ff9a1a2".to_string(),
            route_table2: "rtb-09ebd0517ff96419e".to_string(),
            route_table_association1: "subnet-0cff59825efa397f7/rtb-04da744c73ff9a1a2".to_string(),
            route_table_association2: "subnet-051a9fcd8fa3e1516/rtb-09ebd0517ff96419e".to_string(),
            ssh_security_group: "sg-05c41c122aedbbe72".to_string(),
            ec2_security_group: "sg-0091589061fcd0d52".to_string(),
            ec2_role: "EC2-Dev-EC2serverEc2Role6775A3D4-IOYXJ5aBhapD".to_string(),
            instance_profile: "EC2-Dev-EC2InstanceInstanceProfile2CAA3051-QnRsJpERzkJc".to_string(),
            asset_bucket: "ec2-dev-ec2assetbucketc584b4ab-wdszsco2nzum".to_string(),
            ec2_instance: "i-084b07ea685e39d1d".to_string(),
            ami: None,
        },
    );

    entries.insert(
        EnvName::Stg,
        ResourceMapping {
            vpc: "vpc-00cae33fe84d6baa2".to_string(),
            internet_gateway: "igw-024c88301d939f08d".to_string(),
            public_subnet1: "subnet-01997b2e2184c9fad".to_string(),
            public_subnet2: "subnet-06a48139e1f05ce35".to_string(),
            route_table1: "rtb-04e7d123eb2de4b6d".to_string(),
            route_table2: "rtb-0ae5b427533545225".to_string(),
            route_table_association1: "subnet-01997b2e2184c9fad/rtb-04e7d123eb2de4b6d".to_string(),
            route_table_association2: "subnet-06a48139e1f05ce35/rtb-0ae5b427533545225".to_string(),
            ssh_security_group: "sg-02b0bb5ee7969a4db".to_string(),
            ec2_security_group: "sg-0eb8e09255774711c".to_string(),
            ec2_role: "EC2-Stg-EC2serverEc2Role6775A3D4-oiMp0pW2CgA2".to_string(),
            instance_profile: "EC2-Stg-EC2InstanceInstanceProfile2CAA3051-bZA5FlPL6Zic".to_string(),
            asset_bucket: "ec2-stg-ec2assetbucketc584b4ab-ixd2lcpojxkq".to_string(),
            ec2_instance: "i-071acd3aea4369f21".to_string(),
            ami: None,
        },
    );

    entries.insert(
        EnvName::Prod,
        ResourceMapping {
            vpc: "vpc-02c9ccffda204bf71".to_string(),
            internet_gateway: "igw-0e067e07d15ed8807".to_string(),
            public_subnet1: "subnet-029297dbc45e7e0ea".to_string(),
            public_subnet2: "subnet-0015005d09a73a959".to_string(),
            route_table1: "rtb-0f72278af06c13275".to_string(),
            route_table2: "rtb-057494342af7aa014".to_string(),
            route_table_association1: "subnet-029297dbc45e7e0ea/rtb-0f72278af06c13275".to_string(),
            route_table_association2: "subnet-0015005d09a73a959/rtb-057494342af7aa014".to_string(),
            ssh_security_group: "sg-02402722b63caa77a".to_string(),
            ec2_security_group: "sg-0b6f8694e4d1e54cb".to_string(),
            ec2_role: "EC2-Prod-EC2serverEc2Role6775A3D4-VxbgrSLLUWZn".to_string(),
            instance_profile: "EC2-Prod-EC2InstanceInstanceProfile2CAA3051-pZIDwCyGFdJX".to_string(),
            asset_bucket: "ec2-prod-ec2assetbucketc584b4ab-kiw0zmzgmxfr".to_string(),
            ec2_instance: "i-0ec50891e8e8222ec".to_string(),
            ami: None,
        },
    );

    entries
}
