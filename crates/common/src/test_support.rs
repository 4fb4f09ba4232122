#[cfg(test)]
pub mod tests {
    use crate::credential::DeviceCredential;
    use crate::settings::Settings;

    /// Base64 PKCS#8 DER key of the reference device (2048-bit modulus).
    pub const TEST_DEVICE_PRIVATE_KEY: &str = concat!(
        "MIIEvgIBADANBgkqhkiG9w0BAQEFAASCBKgwggSkAgEAAoIBAQC8cC1MYP95b7PY4Dj6DrPAZs4z",
        "ZJEBriPZPSIu8Zd+j7lw1Jgwvpl1j4lyjoQUdIODHNH171tzJCssJL8wuF/yEppowAn7tMWz3fvx",
        "OrX4pxm2wOKBTXf3U7MIuZe2OiIbgn/08z0ouhkiJ9KxkdAunPhKOZGQGaO1UfHP7Lb98zYZRFoP",
        "NMZaBEUP4afktrOaO7n7OmpBjKX+sDCblolj8I3m+xD4a1dbnXzbGU+btxk2gIJ8NoXLmEHiGYwq",
        "TMMfrjb1xNLaek7D0zc24ALK9jRyLkCK8j72YytKqlS3M+Y5ezVGfuHp005foVYwgssamg3YEcok",
        "k6pKixbo7Vu1AgMBAAECggEBALPMRSyPkLQKBQx2RWczCAgZD76xwjpcMhBh6G/qTKaR9FrYPq6j",
        "7kDhyD/qA9SQp7s+kIec7yEZ7aedGGAgTEvpvDMeqWflwI4yzOYLIv4yUrKxsG23wTPYRQeaLkvN",
        "hCXDitvqCv0FNF4GqV6MxprzY2VPMLjR/gZQPe4q6x+6fsaePdbs2u1k4I5O02eE4IsiciK4qoLY",
        "pqTFV9SoRLzHexEmzJLCD3rc9pI5keMdv+iVzrxaVJPRKIKCBl4CpzsODjrF7l8EGQfWOTKcO0Um",
        "BOqMba9rg8AxOCsnIlNcEfGEksfhFL0MGqHKclbudzZkH4aKGnE4Gh1uYZeYOQECgYEA9RjzSwtG",
        "B3wmEnO5d8fQbcUBFx95rw62BRaXDBZwj78wS7h1i5gJrdRyYENhRXw3USdwmL3mDesgJ6qfXKVf",
        "ngt8W4URvwkSkrg0/RuR5IV7eW1LAgSuGMKQEF1Ok9rXsgL7yuS3ax9D7Aq138C2q82phi7zGbFL",
        "a7DSM49UwRECgYEAxNIEw0X7Fc/eG5sHk7uHaJkq3Hq7dAg7gzprIgXYCbQo2adRHKoX/tuIpLGX",
        "gDA8jBTvGV8JYL7kXDpqHhhvB/jwwkR8FVp5ssseGZTObgw5mKT0LPhunVYUFQfKoGkVGH+z6iBT",
        "jg1iskUMIaeNkzQiG4FSCgcYL1DVExOqMGUCgYEA3taFdOhWDj4Y21Pt/3JjFTo1SJGsb7XfVfb4",
        "89t/EaKRRXb7ICTmP+5U4yK/0I4kORuzqpuVC3iH7qiZZYFR0v68XPU6ckbMZSsnuiwT1AJshbUR",
        "qk8Y/pf+pXJAG/uvekBuL0UNYk610WjXfQzYyJEfHUmYavagDNRh+NDLDRECgYB6pcEQCmDPk8v9",
        "edr75WUY+jFqWRTM1oB3YwT1m5ynV1wJXak+6oOvbhA1SPF2kRh51mW0crN+VRYqnsAX5vPxjOBC",
        "vrhv+gRSNR6ZpFAK5ZVSmKAMEfekFcrH3CYZVcIulQ2BPQm0QIUbP8mygx3G+Dq01x5PX2JjwcQ1",
        "chCgvQKBgFNG9++kP91RFH4LvV7eb2U72nhSOur53Dx6AwilEDTFmparRS7gipe1OvCKzynoYP81",
        "6rCcjanezhW7hcS7r7VAJb/dVjOsuLJCSVgTc8qjrZMWs7aJx9pNzhZGJ6TMS9xru98dmHJX0zzr",
        "Zg9QedEYPlxSbvgGQmzp977QqDWi",
    );

    pub const TEST_ADP_TOKEN: &str = concat!(
        "{enc:RO6CkSjmVSIZJZNJv17YI1nhA0W5QrW3DiJ0SJtNelUX/XXu8VN5KBcMe61E3EaY6YHUJFE",
        "8GYjRQSd2npAhRLox5Thq480f7opOHGlXhxvgPUiNiOIjLhJvV4yWby2nS8yrBK2fM2e7koVQTgR",
        "hgO+Q8kS2S/Vwew00E/BtnbQadRJRXzf9nzaeoqlU5L+renYnpNn1zrnOWpK9iYlNaAfIavVTy+M",
        "sy9bm12ttk6conNnvEhZWqNj1GcCL0BkuSwgQepwHgIc+qlsQtMKmRjXEczZ3ly3S0VuXhMeymJ1",
        "K+ctxhHRN4FgUynUAG85l8VF3AXzGgel+0i/E5MeJsqu0j4vGD/scTHv9NVYWzk8XQYAL0A9KbUH",
        "fCM3yixLLr1eJ8NCrw6Xaz3hthgpB/A6BZwEzu3V+RjYHDL+MIi1X8+0V5Dha/QLvoWWjooZr7WO",
        "447O3SQBgPGYQnKmq4jnyixzTtEN7HSduFy6p00od0pmdxCrR0op65CQT5OJvgdjgPLLBmDvWvxr",
        "h1OjYgUXLbCGc8TtNI6+I6h3crz7K9IEytztwNfSDKYOvTP3pZN2MknRMIZpcR4xNIN1992aw/kp",
        "E2TQl8gG08bXf5boJToJrs+e85IdsSX4u8/I/7GnRb2+lsvmOOVXzIiTWI/fONqUWmHHzuQcdQtL",
        "bowsvAp76gJlajjsRHG9O19/97fO4QG79BQTJMeF5dPqtGpCnsOOyYzvvz7BvaFG5zWBAkzUV1XH",
        "2kAJXJ9ePPsbbhhH13IeBItmWsZKUOyDe6MPVCz6czzZxIDVCSVmUESNP4f5Q9vup4DE8sUWnAvl",
        "Llrna4VfyUWdBgym4qIOuCJfTUipVj/yCIs2cX6BG638Gf+56WXRXMjFHLw0M4nkRI/iyopEWUi8",
        "oz8HLgmk80GUTsOCWDe+UZSfY2xM7AOdA4jGwFmGAWvJayYJIIak3AZhK7K1PWhGhBrbGhmI37Us",
        "3VPdrzWIrVfNqATwXYg9rhrobQvl0nO/HoUc6yQLRp/H2f/RXdpFiE2U5YmcwtwoajcJcaP+LrKN",
        "0nEizXS+wDJA4hEP764DSBz5TzIDP}{key:hfc6hJP0yu+K4rUrBDNHxEMnJ4caIap/DxaJhSv4a",
        "6Oy/l1WKYd6lfhjvAFG5+8Xce0tfYLFKBZzHE1GWz1BE3VARCiSI03Fkt4F9ZDcSohe/XNWokC/k",
        "uAw1L3JRAN/kZ8hk+wt7LKAmWS35eIemKQ1Fh7AvlPc0i+rd/JTY1eKMbQvwxiwDAtnX56boOI4e",
        "+cpmAYdwYR1aLRypkEEVfUaQnGqQ8mdsrBveWTNeoPBr7oY/oXdGa3X4ceZqTEQCUyWkUjA6iN/g",
        "07oTaJ0RtbkINieIxD+yfDTdY/qlyX2LNJfVtuKhVFOjC3eogiYu6NF/IphIXmC+UM40hwVbQ==}",
        "{iv:rB7gMOt3y40wwbJanaHILQ==}{name:QURQVG9rZW5FbmNyeXB0aW9uS2V5}{serial:Mg==",
        "}",
    );

    pub const TEST_SIGNING_DATE: &str = "2020-04-10T14:21:40Z";
    pub const TEST_SIGNING_PATH: &str = "/FirsProxy/getStoreCredentials";

    /// Digest header produced by the reference client for
    /// `GET TEST_SIGNING_PATH` with an empty body at `TEST_SIGNING_DATE`.
    pub const EXPECTED_DIGEST_HEADER: &str = concat!(
        "czUzgbTkzXs2/esqFMcbGuIAdVkRPBzYJFsOnHNep0sW/xyW5hCtOgphRAqZGnUP4jXVvHTf+dRs",
        "Rg5wdSzcp8CG5POxXZ6Qi+0KeKWiraMNmdRP7+L1RLXJ5cgd/HLbrBqGYAK5+VEpNDRitNXBm4KJ",
        "OysPWyvf5mU6tu0KoHCfEm0biNNjTEn54J+FaQlB0xYIb8WHct/vqTQGmKoKhZGsPe1L5HwzTZfg",
        "5Wdld9SjujgaW8uQmWJ7QpDJ0dw5Fv1W0x6fK+pM/rM/rPQ5XrbPYIeXSSPL6KKoqeIPpbwNrVHd",
        "gpeZAU/1BMIF7+zXQKv4L8IjFizgf+L2tqa6Yg==:2020-04-10T14:21:40Z",
    );

    /// Registration response in the shape the device registration endpoint
    /// returns, including fields the credential model does not know about.
    pub fn registration_response_xml() -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                "<response>",
                "<store_authentication_cookie>1Rq6uKVNO3yS+f5PtthBMV1NUrU5iMa9csg/OHU4/VamaYEGmYzMU2Vzt6UsOZh3idhqBZUi7aYUnjlbs9G+MqArtsWTQheQPfOF2L1mpwEBPeOyWSlgdvwxqdlFcxRIqbRf7Wid0ou8RUCGOLtWpxtYuZGe7v4Hsjwbt54fvCLT2FaQj9oqbQ1P4aZiIMyO</store_authentication_cookie>",
                "<device_private_key>{key}</device_private_key>",
                "<adp_token>{token}</adp_token>",
                "<device_type>A3VNNDO1I14V03</device_type>",
                "<given_name>Patrick</given_name>",
                "<name>Patrick Browne</name>",
                "<account_pool>Amazon</account_pool>",
                "<country_of_residence>FR<source_of_cor>CUSTOMER_ADDRESS</source_of_cor></country_of_residence>",
                "<preferred_marketplace>A13V1IB3VIYZZH</preferred_marketplace>",
                "<user_directed_id>amzn1.account.AGR5QVVM3IR5IXV2CDLYSNSOC7FA</user_directed_id>",
                "<user_device_name>Patrick&apos;s 2nd Android Phone</user_device_name>",
                "</response>"
            ),
            key = TEST_DEVICE_PRIVATE_KEY,
            token = TEST_ADP_TOKEN,
        )
    }

    pub fn create_test_credential() -> DeviceCredential {
        DeviceCredential::from_xml(registration_response_xml().as_bytes())
            .expect("fixture registration response should parse")
    }

    pub fn crate_test_settings_str() -> String {
        r#"
            [endpoints]
            stk_host = "https://stk.test"
            firs_host = "https://firs.test"
            auth_host = "https://auth.test"
            signin_url = "https://signin.test/ap/signin"
            return_to = "https://signin.test/gp/sendtokindle"

            [client]
            user_agent = "Mozilla/5.0"
            accept_language = "en-US,*"
            app_name = "ShellExtension"
            app_version = "1.1.1.253"
            os = "MacOSX_10.14.6_x64"
            os_architecture = "x64"
            device_model = "test-device"
            "#
        .to_string()
    }

    pub fn create_test_settings() -> Settings {
        let toml_str = crate_test_settings_str();
        Settings::from_toml(&toml_str).expect("Invalid config")
    }
}
