use log::debug;

use crate::com::Com;
use crate::register::Register;

/// Reads every mapped register except the FIFO data port, which would pop the FIFO.
pub fn dump_registers<C: Com>(com: &mut C) -> Result<Vec<(Register, u8)>, C::Error> {
    let mut dump = Vec::with_capacity(Register::ALL.len());
    for &reg in Register::ALL.iter().filter(|&&reg| reg != Register::FifoData) {
        let value = com.read_register(reg)?;
        debug!("{:?}: {:02x?}", reg, value);
        dump.push((reg, value));
    }
    Ok(dump)
}
