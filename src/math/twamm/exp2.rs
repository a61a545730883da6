use crate::math::uint::U256;
use ruint::uint;

// 2^(1/2^k) for k in 1..=64, as 128.128 fixed point.
const EXP2_TERMS: [U256; 64] = [
    uint!(0x16A09E667F3BCC908B2FB1366EA957D3E_U256),
    uint!(0x1306FE0A31B7152DE8D5A46305C85EDEC_U256),
    uint!(0x1172B83C7D517ADCDF7C8C50EB14A7920_U256),
    uint!(0x10B5586CF9890F6298B92B71842A98364_U256),
    uint!(0x1059B0D31585743AE7C548EB68CA417FE_U256),
    uint!(0x102C9A3E778060EE6F7CACA4F7A29BDE9_U256),
    uint!(0x10163DA9FB33356D84A66AE336DCDFA40_U256),
    uint!(0x100B1AFA5ABCBED6129AB13EC11DC9544_U256),
    uint!(0x10058C86DA1C09EA1FF19D294CF2F679C_U256),
    uint!(0x1002C605E2E8CEC506D21BFC89A23A010_U256),
    uint!(0x100162F3904051FA128BCA9C55C31E5E0_U256),
    uint!(0x1000B175EFFDC76BA38E31671CA939726_U256),
    uint!(0x100058BA01FB9F96D6CACD4B180917C3E_U256),
    uint!(0x10002C5CC37DA9491D0985C348C68E7B3_U256),
    uint!(0x1000162E525EE054754457D5995292026_U256),
    uint!(0x10000B17255775C040618BF4A4ADE83FC_U256),
    uint!(0x1000058B91B5BC9AE2EED81E9B7D4CFAC_U256),
    uint!(0x100002C5C89D5EC6CA4D7C8ACC017B7C9_U256),
    uint!(0x10000162E43F4F831060E02D839A9D16D_U256),
    uint!(0x100000B1721BCFC99D9F890EA06911763_U256),
    uint!(0x10000058B90CF1E6D97F9CA14DBCC1628_U256),
    uint!(0x1000002C5C863B73F016468F6BAC5CA2C_U256),
    uint!(0x100000162E430E5A18F6119E3C02282A5_U256),
    uint!(0x1000000B1721835514B86E6D96EFD1BFF_U256),
    uint!(0x100000058B90C0B48C6BE5DF846C5B2F0_U256),
    uint!(0x10000002C5C8601CC6B9E94213C72737A_U256),
    uint!(0x1000000162E42FFF037DF38AA2B219F06_U256),
    uint!(0x10000000B17217FBA9C739AA5819F44F9_U256),
    uint!(0x1000000058B90BFCDEE5ACD3C1CEDC823_U256),
    uint!(0x100000002C5C85FE31F35A6A30DA1BE50_U256),
    uint!(0x10000000162E42FF0999CE3541B9FFFCF_U256),
    uint!(0x100000000B17217F80F4EF5AADDA45554_U256),
    uint!(0x10000000058B90BFBF8479BD5A81B51AD_U256),
    uint!(0x1000000002C5C85FDF84BD62AE30A74CC_U256),
    uint!(0x100000000162E42FEFB2FED257559BDAA_U256),
    uint!(0x1000000000B17217F7D5A7716BBA4A9AF_U256),
    uint!(0x100000000058B90BFBE9DDBAC5E109CCF_U256),
    uint!(0x10000000002C5C85FDF4B15DE6F17EB0D_U256),
    uint!(0x1000000000162E42FEFA494F1478FDE05_U256),
    uint!(0x10000000000B17217F7D20CF927C8E94C_U256),
    uint!(0x1000000000058B90BFBE8F71CB4E4B33E_U256),
    uint!(0x100000000002C5C85FDF477B662B26945_U256),
    uint!(0x10000000000162E42FEFA3AE53369388C_U256),
    uint!(0x100000000000B17217F7D1D351A389D40_U256),
    uint!(0x10000000000058B90BFBE8E8B2D3D4EDE_U256),
    uint!(0x1000000000002C5C85FDF4741BEA6E77F_U256),
    uint!(0x100000000000162E42FEFA39FE95583C3_U256),
    uint!(0x1000000000000B17217F7D1CFB72B45E2_U256),
    uint!(0x100000000000058B90BFBE8E7CC35C3F1_U256),
    uint!(0x10000000000002C5C85FDF473E242EA38_U256),
    uint!(0x1000000000000162E42FEFA39F02B772C_U256),
    uint!(0x10000000000000B17217F7D1CF7D83C1A_U256),
    uint!(0x1000000000000058B90BFBE8E7BDCBE2E_U256),
    uint!(0x100000000000002C5C85FDF473DEA871F_U256),
    uint!(0x10000000000000162E42FEFA39EF44D91_U256),
    uint!(0x100000000000000B17217F7D1CF79E949_U256),
    uint!(0x10000000000000058B90BFBE8E7BCE544_U256),
    uint!(0x1000000000000002C5C85FDF473DE6ECA_U256),
    uint!(0x100000000000000162E42FEFA39EF366F_U256),
    uint!(0x1000000000000000B17217F7D1CF79AFA_U256),
    uint!(0x100000000000000058B90BFBE8E7BCD6D_U256),
    uint!(0x10000000000000002C5C85FDF473DE6B2_U256),
    uint!(0x1000000000000000162E42FEFA39EF358_U256),
    uint!(0x10000000000000000B17217F7D1CF79AC_U256),
];

/// Binary exponential of a 64.64 fixed point exponent `x`, computed as a
/// product of per-bit constants. The caller must ensure `x < 64 << 64`; the
/// result is `2^x` scaled so that the fractional product starts at 2^127 and
/// the integer part of `x` removes right shifts.
pub fn exp2(x: u128) -> u128 {
    debug_assert!(x < 64 << 64);

    let mut result: U256 = U256::ONE << 127;

    for (i, term) in EXP2_TERMS.iter().enumerate() {
        if x & (1 << (63 - i)) != 0 {
            result = (result * term) >> 128;
        }
    }

    result >>= 63 - ((x >> 64) as usize);

    result.to::<u128>()
}
